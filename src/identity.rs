//! Device identity: stable name and locally-administered station MAC.
//!
//! Both are generated once on first boot and persisted in the `"id"`
//! namespace, so a device keeps its mDNS hostname and DHCP lease across
//! reflashes.  WiFi credentials live beside them in `"wlan"` with
//! compiled-in fallbacks for the out-of-box experience.

use heapless::String;
use log::{info, warn};
use rand::Rng;

use crate::app::ports::{StorageError, StoragePort};
use crate::error::IdentityError;

/// Maximum stored device name length (also the mDNS label budget).
pub const MAX_NAME_LEN: usize = 24;
/// Maximum stored SSID / passphrase length.
pub const MAX_CRED_LEN: usize = 32;

const NS_ID: &str = "id";
const KEY_HOSTNAME: &str = "hostname";
const KEY_MAC: &str = "mac";

const NS_WLAN: &str = "wlan";
const KEY_SSID: &str = "ssid";
const KEY_PASS: &str = "pass";

/// Credentials compiled in for devices that were never provisioned.
pub const DEFAULT_SSID: &str = "robot";
pub const DEFAULT_PASSPHRASE: &str = "goodlife";

const NAME_PREFIXES: [&str; 36] = [
    "Robo", "Mech", "Nano", "Byte", "Beta", "Tron", "Code", "Volt",
    "Gear", "Chip", "Hex", "Pix", "Neo", "Bit", "Dyno", "Electro",
    "Flux", "Atom", "Core", "Auto", "Luna", "Nova", "Bolt", "Data",
    "Spark", "Glim", "Blink", "Buzz", "Kilo", "Mini", "Pico", "Giga",
    "Tera", "Astro", "Juno", "Velo",
];

const NAME_SUFFIXES: [&str; 36] = [
    "Lab", "Kit", "Hub", "Pix", "Bit", "Loop", "Bot", "Cube",
    "Droid", "Node", "Tick", "Dash", "Spark", "Mod", "Brain", "Bug",
    "Box", "Link", "Fun", "Nest", "Tron", "Orb", "Core", "Max",
    "Plus", "Star", "Beam", "Logic", "Wave", "Bolt", "Flow", "Net",
    "Grid", "Mind", "Edge", "Zone",
];

const NAME_TAIL_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Stable device identity, loaded or minted at boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Hostname / mDNS label, e.g. `esp-RoboLabX7`.
    pub name: String<MAX_NAME_LEN>,
    /// Locally-administered unicast station MAC (first octet `0x02`).
    pub mac: [u8; 6],
}

impl DeviceIdentity {
    /// `AA:BB:CC:DD:EE:FF` rendering of the MAC.
    pub fn mac_string(&self) -> String<17> {
        format_mac(&self.mac)
    }
}

/// WiFi join credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: String<MAX_CRED_LEN>,
    pub passphrase: String<MAX_CRED_LEN>,
}

/// Load the persisted identity, minting and storing any missing half.
///
/// Generation draws from `rng`; persistence failures propagate so boot
/// can decide whether to continue with a volatile identity.
pub fn load_or_create_identity<S, R>(
    storage: &mut S,
    rng: &mut R,
) -> Result<DeviceIdentity, StorageError>
where
    S: StoragePort,
    R: Rng,
{
    let name = match read_string::<_, MAX_NAME_LEN>(storage, NS_ID, KEY_HOSTNAME) {
        Some(name) if !name.is_empty() => {
            info!("identity: loaded name {name}");
            name
        }
        _ => {
            let name = generate_name(rng);
            storage.write(NS_ID, KEY_HOSTNAME, name.as_bytes())?;
            info!("identity: minted name {name}");
            name
        }
    };

    let mac = match read_string::<_, 17>(storage, NS_ID, KEY_MAC)
        .as_deref()
        .and_then(parse_mac)
    {
        Some(mac) => mac,
        None => {
            let mac = generate_mac(rng);
            storage.write(NS_ID, KEY_MAC, format_mac(&mac).as_bytes())?;
            info!("identity: minted MAC {}", format_mac(&mac));
            mac
        }
    };

    Ok(DeviceIdentity { name, mac })
}

/// Load credentials, seeding the compiled-in defaults on first use so
/// provisioning tools always find a complete record.  A seeding write
/// failure degrades to the in-memory defaults.
pub fn load_or_default_credentials<S: StoragePort>(storage: &mut S) -> Credentials {
    let ssid = match read_string::<_, MAX_CRED_LEN>(storage, NS_WLAN, KEY_SSID)
        .filter(|s| !s.is_empty())
    {
        Some(ssid) => ssid,
        None => {
            if let Err(e) = storage.write(NS_WLAN, KEY_SSID, DEFAULT_SSID.as_bytes()) {
                warn!("identity: seeding default SSID failed: {e}");
            }
            String::try_from(DEFAULT_SSID).unwrap_or_default()
        }
    };
    let passphrase = match read_string::<_, MAX_CRED_LEN>(storage, NS_WLAN, KEY_PASS) {
        Some(pass) => pass,
        None => {
            if let Err(e) = storage.write(NS_WLAN, KEY_PASS, DEFAULT_PASSPHRASE.as_bytes()) {
                warn!("identity: seeding default passphrase failed: {e}");
            }
            String::try_from(DEFAULT_PASSPHRASE).unwrap_or_default()
        }
    };
    Credentials { ssid, passphrase }
}

/// Persist new credentials. Takes effect on the next boot; the running
/// session keeps its current association.
pub fn save_credentials<S: StoragePort>(
    storage: &mut S,
    creds: &Credentials,
) -> Result<(), StorageError> {
    storage.write(NS_WLAN, KEY_SSID, creds.ssid.as_bytes())?;
    storage.write(NS_WLAN, KEY_PASS, creds.passphrase.as_bytes())
}

/// Validate and persist a new device name. On rejection the stored name
/// is untouched and the error says why.
pub fn rename<S: StoragePort>(
    storage: &mut S,
    identity: &mut DeviceIdentity,
    proposed: &str,
) -> Result<(), crate::error::Error> {
    if !is_valid_name(proposed) {
        return Err(IdentityError::InvalidName.into());
    }
    // Length checked by is_valid_name.
    let name = String::try_from(proposed).map_err(|()| IdentityError::InvalidName)?;
    storage.write(NS_ID, KEY_HOSTNAME, name.as_bytes())?;
    identity.name = name;
    Ok(())
}

/// Name charset: 1-24 chars of ASCII alphanumerics, `-`, `_`.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn generate_name<R: Rng>(rng: &mut R) -> String<MAX_NAME_LEN> {
    let prefix = NAME_PREFIXES[rng.gen_range(0..NAME_PREFIXES.len())];
    let suffix = NAME_SUFFIXES[rng.gen_range(0..NAME_SUFFIXES.len())];
    let t1 = NAME_TAIL_CHARSET[rng.gen_range(0..NAME_TAIL_CHARSET.len())] as char;
    let t2 = NAME_TAIL_CHARSET[rng.gen_range(0..NAME_TAIL_CHARSET.len())] as char;

    let mut name = String::new();
    // Worst case "esp-" + 7 + 5 + 2 = 18 chars, always fits.
    let _ = name.push_str("esp-");
    let _ = name.push_str(prefix);
    let _ = name.push_str(suffix);
    let _ = name.push(t1);
    let _ = name.push(t2);
    name
}

fn generate_mac<R: Rng>(rng: &mut R) -> [u8; 6] {
    let mut mac = [0u8; 6];
    rng.fill(&mut mac[1..]);
    // Locally administered, unicast.
    mac[0] = 0x02;
    mac
}

fn format_mac(mac: &[u8; 6]) -> String<17> {
    let mut out = String::new();
    for (i, byte) in mac.iter().enumerate() {
        if i > 0 {
            let _ = out.push(':');
        }
        let _ = core::fmt::write(&mut out, format_args!("{byte:02X}"));
    }
    out
}

fn parse_mac(text: &str) -> Option<[u8; 6]> {
    let mut mac = [0u8; 6];
    let mut parts = text.split(':');
    for slot in &mut mac {
        *slot = u8::from_str_radix(parts.next()?, 16).ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(mac)
}

fn read_string<S: StoragePort, const N: usize>(
    storage: &S,
    namespace: &str,
    key: &str,
) -> Option<String<N>> {
    let mut buf = [0u8; N];
    let len = storage.read(namespace, key, &mut buf).ok()?;
    let text = core::str::from_utf8(&buf[..len]).ok()?;
    String::try_from(text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::nvs::NvsStorage;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(0x5eed)
    }

    #[test]
    fn first_boot_mints_and_persists_identity() {
        let mut storage = NvsStorage::new();
        let id = load_or_create_identity(&mut storage, &mut rng()).unwrap();

        assert!(id.name.starts_with("esp-"));
        assert!(is_valid_name(&id.name));
        assert_eq!(id.mac[0], 0x02);
        assert!(storage.exists("id", "hostname"));
        assert!(storage.exists("id", "mac"));
    }

    #[test]
    fn identity_is_stable_across_boots() {
        let mut storage = NvsStorage::new();
        let first = load_or_create_identity(&mut storage, &mut rng()).unwrap();
        let mut other = SmallRng::seed_from_u64(0xdead);
        let second = load_or_create_identity(&mut storage, &mut other).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn corrupt_mac_record_is_regenerated() {
        let mut storage = NvsStorage::new();
        storage.write("id", "mac", b"not a mac").unwrap();
        let id = load_or_create_identity(&mut storage, &mut rng()).unwrap();
        assert_eq!(id.mac[0], 0x02);
        // The regenerated MAC replaced the corrupt record.
        let reloaded = load_or_create_identity(&mut storage, &mut rng()).unwrap();
        assert_eq!(id.mac, reloaded.mac);
    }

    #[test]
    fn mac_string_roundtrips() {
        let mac = [0x02, 0xAB, 0x00, 0x1F, 0xFF, 0x7C];
        assert_eq!(parse_mac(&format_mac(&mac)).unwrap(), mac);
    }

    #[test]
    fn default_credentials_are_seeded_on_first_use() {
        let mut storage = NvsStorage::new();
        let creds = load_or_default_credentials(&mut storage);
        assert_eq!(creds.ssid.as_str(), DEFAULT_SSID);
        assert_eq!(creds.passphrase.as_str(), DEFAULT_PASSPHRASE);
        // The defaults now exist as a complete stored record.
        assert!(storage.exists("wlan", "ssid"));
        assert!(storage.exists("wlan", "pass"));
    }

    #[test]
    fn saved_credentials_round_trip() {
        let mut storage = NvsStorage::new();
        let creds = Credentials {
            ssid: String::try_from("workshop").unwrap(),
            passphrase: String::try_from("secret123").unwrap(),
        };
        save_credentials(&mut storage, &creds).unwrap();
        assert_eq!(load_or_default_credentials(&mut storage), creds);
    }

    #[test]
    fn rename_validates_charset_and_length() {
        let mut storage = NvsStorage::new();
        let mut id = load_or_create_identity(&mut storage, &mut rng()).unwrap();
        let original = id.name.clone();

        assert!(rename(&mut storage, &mut id, "").is_err());
        assert!(rename(&mut storage, &mut id, "has space").is_err());
        assert!(rename(&mut storage, &mut id, "uml\u{e4}ut").is_err());
        assert!(rename(&mut storage, &mut id, "a-very-long-name-over-24-chars").is_err());
        // Rejections leave stored state untouched.
        assert_eq!(id.name, original);

        rename(&mut storage, &mut id, "my-robot_01").unwrap();
        assert_eq!(id.name.as_str(), "my-robot_01");
        let reloaded = load_or_create_identity(&mut storage, &mut rng()).unwrap();
        assert_eq!(reloaded.name.as_str(), "my-robot_01");
    }
}
