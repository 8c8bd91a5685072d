//! File formats touched by the injector.
//!
//! Only TIFF structure is parsed here. The Prairie descriptor XML lives in
//! [`crate::acquisition`] and OME-XML in [`crate::ome`].

pub mod tiff;
