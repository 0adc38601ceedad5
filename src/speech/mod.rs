#[cfg(feature = "speech")]
pub mod model;
#[cfg(feature = "speech")]
pub mod transcribe;
pub mod transcript;
