//! Handlers with behaviour beyond the defaults.

mod data_extension;

pub use data_extension::{
    DataExtensionFieldHandler, DataExtensionHandler, DataExtensionRowHandler, RowProtocol,
};
