mod blob_errors;
mod codec_errors;
mod store_errors;
mod validation_errors;

pub use blob_errors::*;
pub use codec_errors::*;
pub use store_errors::*;
pub use validation_errors::*;
