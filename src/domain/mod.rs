//! Domain layer: strong types with validation and invariants (no I/O).

mod request;
mod response;
mod validation;
mod value;

pub use request::{
    CONTACT_PATH, CREATE_URL_SID, DEVICE_CONFIG_PATH, DEVICE_INFO_PATH, GET_CALL_BARRING_LIST,
    GET_CONFIG_FILE, GET_INFO, GET_PHONEBOOK, GET_PHONEBOOK_LIST, SoapRequest,
};
pub use response::{
    BarringListResponse, ConfigFileResponse, DeviceInfoResponse, PhonebookListResponse,
    PhonebookResponse, UrlSidResponse,
};
pub use validation::ValidationError;
pub use value::{Endpoint, SoapAction};
