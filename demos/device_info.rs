use std::io;

use fritz_backup::{DEVICE_INFO_PATH, DeviceInfoResponse, Endpoint, GET_INFO, SoapClient};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::var("FRITZ_URL").unwrap_or_else(|_| "http://192.168.178.1:49000".into());
    let username = std::env::var("FRITZ_USERNAME").unwrap_or_default();
    let password = std::env::var("FRITZ_PASSWORD").map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "FRITZ_PASSWORD environment variable is required",
        )
    })?;

    let client = SoapClient::new(Endpoint::new(url, username, password))?;
    let info: DeviceInfoResponse = client.call(DEVICE_INFO_PATH, GET_INFO, "")?;

    println!(
        "model: {}, firmware: {}, uptime: {:?}, description: {}",
        info.model_name,
        info.software_version,
        info.uptime(),
        info.description
    );

    Ok(())
}
