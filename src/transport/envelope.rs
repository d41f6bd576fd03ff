use quick_xml::escape::escape;

use crate::domain::SoapRequest;

const ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const ENCODING_STYLE: &str = "http://schemas.xmlsoap.org/soap/encoding/";

/// Wire body for `request`: a SOAP 1.1 envelope, or nothing for plain downloads.
pub fn encode_envelope(request: &SoapRequest) -> Vec<u8> {
    let Some(action) = request.action() else {
        return Vec::new();
    };
    let method = action.method();
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            "\n",
            r#"<s:Envelope s:encodingStyle="{style}" xmlns:s="{envelope}">"#,
            "<s:Body>",
            r#"<u:{method} xmlns:u="{namespace}">{payload}</u:{method}>"#,
            "</s:Body>",
            "</s:Envelope>",
        ),
        style = ENCODING_STYLE,
        envelope = ENVELOPE_NS,
        method = method,
        namespace = escape(action.namespace()),
        payload = request.payload(),
    )
    .into_bytes()
}

/// `<name>value</name>` with `value` escaped, for building inner payloads.
pub fn argument(name: &str, value: &str) -> String {
    format!("<{name}>{}</{name}>", escape(value))
}
