//! Device models for the iceflow toolchain.
//!
//! [`DeviceDescriptor`] parses and validates the compact device strings used
//! in project configuration (`ice40-hx8k-ct256`), and [`AttributeTable`]
//! records how abstract signal attributes map onto the toolchain.
//!
//! ```
//! use iceflow_arch::DeviceDescriptor;
//!
//! let device = DeviceDescriptor::parse("ice40-hx1k-tq144").unwrap();
//! assert_eq!(device.size().size_code(), "1k");
//! ```

#![warn(missing_docs)]

pub mod attributes;
pub mod device;

pub use attributes::{AttributeTable, Translation};
pub use device::{size_code, DeviceDescriptor, DeviceError, DeviceSize, Family};
