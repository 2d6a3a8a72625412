pub mod financing;
pub mod simulate;
pub mod tax;
