//! Deterministic profile synthesis
//!
//! When neither the registry nor any provider can answer, a plausible
//! profile is derived purely from the identifier's bytes. The seed is a
//! stable content hash (SHA-256), never a runtime identity hash, so the
//! same IMEI synthesizes the same descriptor across calls, threads, and
//! process restarts. Callers see these results tagged as synthetic and
//! must not treat them as ground truth.

use sha2::{Digest, Sha256};

use crate::descriptor::DeviceDescriptor;
use crate::imei::Imei;

/// A manufacturer family a TAC range can be attributed to
struct Family {
    manufacturer: &'static str,
    os: &'static str,
    models: &'static [&'static str],
}

static APPLE: Family = Family {
    manufacturer: "Apple",
    os: "iOS",
    models: &[
        "iPhone XR",
        "iPhone 11",
        "iPhone 12",
        "iPhone 12 Pro",
        "iPhone 13",
        "iPhone 13 mini",
        "iPhone 14 Pro Max",
        "iPhone SE (2nd generation)",
    ],
};

static SAMSUNG: Family = Family {
    manufacturer: "Samsung",
    os: "Android",
    models: &[
        "Galaxy S10",
        "Galaxy S21",
        "Galaxy S22",
        "Galaxy Note 10",
        "Galaxy A52",
        "Galaxy A13",
        "Galaxy Z Flip 3",
    ],
};

static XIAOMI: Family = Family {
    manufacturer: "Xiaomi",
    os: "Android",
    models: &[
        "Redmi Note 9",
        "Redmi Note 11",
        "Mi 10T",
        "Mi 11 Lite",
        "Poco X3 Pro",
    ],
};

static HUAWEI: Family = Family {
    manufacturer: "Huawei",
    os: "Android",
    models: &["P30", "P40 Pro", "Mate 20 Pro", "Mate 30", "Nova 5T"],
};

/// Known reporting-body TAC ranges and the family they lean towards.
/// Coarse on purpose: this only biases a guess, it never claims identity.
static FAMILY_RANGES: &[(u32, u32, &Family)] = &[
    (1_000_000, 1_999_999, &APPLE),    // 01xxxxxx
    (35_000_000, 35_499_999, &SAMSUNG),
    (35_500_000, 35_999_999, &APPLE),
    (86_000_000, 86_499_999, &XIAOMI),
    (86_500_000, 86_999_999, &HUAWEI),
];

static CAPACITIES: &[&str] = &["64 GB", "128 GB", "256 GB", "512 GB"];

static COLORS: &[&str] = &[
    "Black", "White", "Silver", "Gold", "Blue", "Green", "Red", "Graphite",
];

static SIM_LOCK: &[&str] = &["unlocked", "unlocked", "locked"];

static WARRANTY: &[&str] = &["active", "expired", "expired"];

// Weighted towards clean; a blacklisted guess should be the rare case
static BLACKLIST: &[&str] = &["clean", "clean", "clean", "clean", "blacklisted"];

static ACTIVATION_LOCK: &[&str] = &["off", "off", "on"];

const EARLIEST_YEAR: u16 = 2016;
const YEAR_SPAN: u64 = 8;

/// Derive a stable device profile from an identifier
///
/// Pure function of the IMEI string: byte-identical output for the same
/// input, no matter when or where it runs.
pub fn synthesize(imei: &Imei) -> DeviceDescriptor {
    let mut state = seed(imei.as_str());

    let family = family_for_tac(imei.tac());
    let (manufacturer, model, os_family) = match family {
        Some(family) => (
            family.manufacturer.to_string(),
            pick(&mut state, family.models).to_string(),
            Some(family.os.to_string()),
        ),
        None => {
            // Burn the model draw anyway so field choices stay aligned
            // between known and unknown families.
            let _ = splitmix64(&mut state);
            ("Unknown".to_string(), "Unknown model".to_string(), None)
        }
    };

    DeviceDescriptor {
        manufacturer,
        model,
        storage: vec![pick(&mut state, CAPACITIES).to_string()],
        color: Some(pick(&mut state, COLORS).to_string()),
        os_family,
        release_year: Some(EARLIEST_YEAR + (splitmix64(&mut state) % YEAR_SPAN) as u16),
        screen_inches: None,
        chipset: None,
        sim_lock: Some(pick(&mut state, SIM_LOCK).to_string()),
        warranty: Some(pick(&mut state, WARRANTY).to_string()),
        blacklist: Some(pick(&mut state, BLACKLIST).to_string()),
        activation_lock: Some(pick(&mut state, ACTIVATION_LOCK).to_string()),
    }
}

/// Stable 64-bit seed from the identifier's bytes
fn seed(id: &str) -> u64 {
    let digest = Sha256::digest(id.as_bytes());
    u64::from_be_bytes(digest[..8].try_into().expect("digest is 32 bytes"))
}

fn family_for_tac(tac: &str) -> Option<&'static Family> {
    let value: u32 = tac.parse().ok()?;
    FAMILY_RANGES
        .iter()
        .find(|(lo, hi, _)| (*lo..=*hi).contains(&value))
        .map(|(_, _, family)| *family)
}

fn pick<'a>(state: &mut u64, items: &[&'a str]) -> &'a str {
    items[(splitmix64(state) % items.len() as u64) as usize]
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
