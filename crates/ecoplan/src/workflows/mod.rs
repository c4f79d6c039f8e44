pub mod intake;
pub(crate) mod numeric;
pub mod planning;
