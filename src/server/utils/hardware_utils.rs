/// the two values a portal wants in `get_profile` on top of the raw device ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareIdentity {
    pub hw_version: String,
    pub hw_version_2: String,
}

impl HardwareIdentity {
    /// hw_version is "1.7-BD-" + the first byte of md5(mac) in uppercase hex,
    /// hw_version_2 is md5(lowercase(serial) + lowercase(mac)).
    ///
    /// empty inputs still hash (md5 of ""), portals accept that so it isn't an error
    pub fn derive(mac_address: &str, serial_number: &str) -> Self {
        let mac_hash = md5_hex(mac_address);

        Self {
            hw_version: format!("1.7-BD-{}", mac_hash[..2].to_uppercase()),
            hw_version_2: md5_hex(&format!(
                "{}{}",
                serial_number.to_lowercase(),
                mac_address.to_lowercase()
            )),
        }
    }
}

/// lowercase hex md5 digest
pub fn md5_hex(input: &str) -> String {
    hex::encode(md5::compute(input.as_bytes()).0)
}
