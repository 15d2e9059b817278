pub mod advice;
pub mod fact;
pub mod observation;
pub mod value;

pub use advice::*;
pub use fact::*;
pub use observation::*;
pub use value::*;
