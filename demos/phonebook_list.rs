use std::io;

use fritz_backup::{
    CONTACT_PATH, Endpoint, GET_PHONEBOOK, GET_PHONEBOOK_LIST, PhonebookListResponse,
    PhonebookResponse, SoapClient, argument,
};

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
    let list: PhonebookListResponse = client.call(CONTACT_PATH, GET_PHONEBOOK_LIST, "")?;

    for id in &list.ids {
        let phonebook: PhonebookResponse =
            client.call(CONTACT_PATH, GET_PHONEBOOK, &argument("NewPhonebookID", id))?;
        println!("{id}: {} -> {}", phonebook.name, phonebook.url);
    }

    Ok(())
}
