pub mod location;
pub mod naming;
pub mod redirect;
pub mod source;

pub use location::{BoundingBox, BoundingBoxFilter, Extent, Location};
pub use redirect::{Redirect, RedirectInput};
pub use source::{AuthenticationType, DataType, DataTypeFilter, SourceUrls, Status};
