//! Generators for well-known string formats.

use std::net::{Ipv4Addr, Ipv6Addr};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, SecondsFormat};
use fake::Fake;
use rand::{Rng, RngCore};
use specimen_core::StringFormat;

const BASE36: &str = "0123456789abcdefghijklmnopqrstuvwxyz";
const CROCKFORD: &str = "0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const NANOID_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";
const EMOJI: &[char] = &['😀', '🎉', '🚀', '🌱', '🔥', '🍕', '🐙', '🌈', '🎲', '🧪'];

/// Window for generated timestamps: 1970-01-01 to 2100-01-01.
const MAX_TIMESTAMP_MS: i64 = 4_102_444_800_000;

pub(crate) fn generate(format: StringFormat, rng: &mut dyn RngCore) -> String {
    match format {
        StringFormat::Email => fake::faker::internet::en::SafeEmail().fake_with_rng(rng),
        StringFormat::Url => {
            let word: String = fake::faker::lorem::en::Word().fake_with_rng(rng);
            let suffix: String = fake::faker::internet::en::DomainSuffix().fake_with_rng(rng);
            format!("https://{}.{suffix}/", word.to_lowercase())
        }
        StringFormat::Uuid => {
            let mut bytes = [0_u8; 16];
            rng.fill_bytes(&mut bytes);
            bytes[6] = (bytes[6] & 0x0f) | 0x40;
            bytes[8] = (bytes[8] & 0x3f) | 0x80;
            uuid::Uuid::from_bytes(bytes).to_string()
        }
        StringFormat::Cuid => format!("c{}", pick(BASE36, 24, rng)),
        StringFormat::Cuid2 => {
            let head = pick(&BASE36[10..], 1, rng);
            format!("{head}{}", pick(BASE36, 23, rng))
        }
        StringFormat::Ulid => {
            let head = pick(&CROCKFORD[..8], 1, rng);
            format!("{head}{}", pick(CROCKFORD, 25, rng))
        }
        StringFormat::NanoId => pick(NANOID_ALPHABET, 21, rng),
        StringFormat::Emoji => {
            let count = rng.random_range(1..=3);
            (0..count)
                .map(|_| EMOJI[rng.random_range(0..EMOJI.len())])
                .collect()
        }
        StringFormat::Ipv4 => Ipv4Addr::from(rng.random::<u32>()).to_string(),
        StringFormat::Ipv6 => Ipv6Addr::from(rng.random::<u128>()).to_string(),
        StringFormat::Datetime => timestamp(rng).to_rfc3339_opts(SecondsFormat::Millis, true),
        StringFormat::Date => timestamp(rng).format("%Y-%m-%d").to_string(),
        StringFormat::Time => timestamp(rng).format("%H:%M:%S%.3f").to_string(),
        StringFormat::Base64 => {
            let len = rng.random_range(1..=24);
            let mut bytes = vec![0_u8; len];
            rng.fill_bytes(&mut bytes);
            STANDARD.encode(bytes)
        }
    }
}

fn pick(alphabet: &str, len: usize, rng: &mut dyn RngCore) -> String {
    let chars: Vec<char> = alphabet.chars().collect();
    (0..len)
        .map(|_| chars[rng.random_range(0..chars.len())])
        .collect()
}

fn timestamp(rng: &mut dyn RngCore) -> DateTime<chrono::Utc> {
    let millis = rng.random_range(0..MAX_TIMESTAMP_MS);
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}
