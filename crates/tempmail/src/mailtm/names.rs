//! Random mailbox address and password generation
//!
//! Addresses look like `quiet-amber-heron-417@domain`.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::models::Credential;

const ADJECTIVES: &[&str] = &[
    "agile", "bold", "brave", "bright", "calm", "clever", "cosmic", "crisp", "daring", "eager",
    "fancy", "gentle", "glad", "grand", "happy", "humble", "jolly", "keen", "kind", "lively",
    "lucky", "mellow", "merry", "mighty", "nimble", "noble", "polite", "proud", "quick", "quiet",
    "rapid", "shiny", "silent", "sleepy", "smooth", "steady", "sunny", "swift", "tidy", "witty",
];

const COLORS: &[&str] = &[
    "amber", "aqua", "azure", "beige", "black", "blue", "bronze", "brown", "coral", "crimson",
    "cyan", "gold", "gray", "green", "indigo", "ivory", "jade", "lavender", "lime", "magenta",
    "maroon", "olive", "orange", "peach", "pink", "plum", "purple", "red", "rose", "ruby",
    "salmon", "silver", "tan", "teal", "turquoise", "violet", "white", "yellow",
];

const ANIMALS: &[&str] = &[
    "badger", "bat", "bear", "beaver", "bison", "camel", "cat", "cobra", "crane", "crow",
    "deer", "dolphin", "eagle", "falcon", "ferret", "finch", "fox", "gecko", "goose", "hare",
    "hawk", "heron", "ibis", "koala", "lemur", "lion", "lynx", "mole", "moose", "newt",
    "otter", "owl", "panda", "puffin", "rabbit", "raven", "seal", "swan", "tiger", "wolf",
];

const PASSWORD_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const PASSWORD_LEN: usize = 13;

/// Generate `adjective-color-animal-NNN` with NNN in 100..=999
pub fn generate_local_part<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("quiet");
    let color = COLORS.choose(rng).copied().unwrap_or("gray");
    let animal = ANIMALS.choose(rng).copied().unwrap_or("owl");
    let suffix: u16 = rng.gen_range(100..=999);
    format!("{}-{}-{}-{}", adjective, color, animal, suffix)
}

/// Generate a random base-36 password
pub fn generate_password<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..PASSWORD_LEN)
        .map(|_| PASSWORD_ALPHABET[rng.gen_range(0..PASSWORD_ALPHABET.len())] as char)
        .collect()
}

/// Generate a fresh credential for the given domain
pub fn generate_credential(domain: &str) -> Credential {
    let mut rng = rand::thread_rng();
    let address = format!("{}@{}", generate_local_part(&mut rng), domain);
    Credential::new(address, generate_password(&mut rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_local_part_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let local = generate_local_part(&mut rng);
            let parts: Vec<&str> = local.split('-').collect();
            assert_eq!(parts.len(), 4, "unexpected local part {}", local);
            assert!(ADJECTIVES.contains(&parts[0]));
            assert!(COLORS.contains(&parts[1]));
            assert!(ANIMALS.contains(&parts[2]));
            let suffix: u16 = parts[3].parse().unwrap();
            assert!((100..=999).contains(&suffix));
        }
    }

    #[test]
    fn test_password_alphabet() {
        let mut rng = StdRng::seed_from_u64(11);
        let password = generate_password(&mut rng);
        assert_eq!(password.len(), PASSWORD_LEN);
        assert!(password.bytes().all(|b| PASSWORD_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_generate_credential_uses_domain() {
        let credential = generate_credential("example.test");
        assert!(credential.address.ends_with("@example.test"));
        assert_ne!(credential.password, "");
    }
}
