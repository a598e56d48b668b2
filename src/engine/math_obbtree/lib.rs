mod obb;
pub use obb::*;

mod sphere;
pub use sphere::*;

mod symmetric3x3;
pub use symmetric3x3::*;

mod geometry_tests;
pub use geometry_tests::*;
