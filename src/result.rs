use crate::WaasError;

pub type WaasResult<T> = std::result::Result<T, WaasError>;
