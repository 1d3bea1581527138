pub mod book;
pub mod generation;
pub mod raster;

pub use book::{BookState, Page};
pub use generation::{
    AgeBand, Complexity, GenerationBatch, GenerationInput, GenerationItem, GenerationStatus,
};
pub use raster::EncodedImage;
