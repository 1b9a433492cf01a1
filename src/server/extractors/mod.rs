mod request_origin_extractor;
mod validation_extractor;

pub use request_origin_extractor::*;
pub use validation_extractor::*;
