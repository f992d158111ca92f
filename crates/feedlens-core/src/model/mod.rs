mod feedback;
mod insights;
mod status;

pub use feedback::*;
pub use insights::*;
pub use status::*;
