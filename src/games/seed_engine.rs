//! Seed generation, commitment and the deterministic hash stream
//!
//! The stream construction is part of the public fairness contract: archived
//! seeds must reproduce historical outcomes bit-for-bit, so neither the
//! message layout nor the rehash rule may change.

use crate::errors::{CrownwynnError, CrownwynnResult, ParameterError};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::fmt;

/// Entropy per generated seed (256 bits)
pub const SEED_BYTES: usize = 32;

/// Generate a fresh server seed: 32 bytes from the OS CSPRNG, hex encoded.
pub fn new_server_seed() -> CrownwynnResult<String> {
    random_hex_token()
}

/// Generate a client seed for players who have not supplied their own.
pub fn new_client_seed() -> CrownwynnResult<String> {
    random_hex_token()
}

fn random_hex_token() -> CrownwynnResult<String> {
    let mut bytes = [0u8; SEED_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CrownwynnError::EntropyUnavailable(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// SHA-256 commitment of a seed, lowercase hex.
pub fn commit(seed: &str) -> String {
    hex::encode(Sha256::digest(seed.as_bytes()))
}

/// Input message for every outcome derivation
pub fn outcome_message(server_seed: &str, client_seed: &str, nonce: u64) -> String {
    format!("{}:{}:{}", server_seed, client_seed, nonce)
}

/// Byte stream over chained SHA-256 digests.
///
/// Bytes are consumed in digest order. Once a digest is used up the next one
/// is `SHA-256("{previous_digest_hex}:{found}")`, where `found` is the number
/// of unique values the caller has collected so far.
pub struct HashStream {
    digest: [u8; 32],
    cursor: usize,
}

impl HashStream {
    pub fn new(server_seed: &str, client_seed: &str, nonce: u64) -> Self {
        let message = outcome_message(server_seed, client_seed, nonce);
        Self {
            digest: Sha256::digest(message.as_bytes()).into(),
            cursor: 0,
        }
    }

    /// Next byte of the stream, rehashing first if the current digest is spent.
    pub fn next_byte(&mut self, found: usize) -> u8 {
        if self.cursor >= self.digest.len() {
            self.rehash(found);
        }
        let byte = self.digest[self.cursor];
        self.cursor += 1;
        byte
    }

    fn rehash(&mut self, found: usize) {
        let message = format!("{}:{}", hex::encode(self.digest), found);
        self.digest = Sha256::digest(message.as_bytes()).into();
        self.cursor = 0;
    }
}

/// Collect `count` distinct values `byte % space + offset`, sorted ascending.
///
/// Rejects requests for more unique values than `space` holds; otherwise the
/// loop always converges because every residue stays reachable.
pub fn draw_unique(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    count: usize,
    space: u8,
    offset: u8,
) -> Result<Vec<u8>, ParameterError> {
    if space == 0 || count > space as usize {
        return Err(ParameterError::UniqueCount {
            wanted: count,
            space,
        });
    }
    Ok(collect_unique(
        HashStream::new(server_seed, client_seed, nonce),
        count,
        space,
        offset,
    ))
}

pub(crate) fn collect_unique(mut stream: HashStream, count: usize, space: u8, offset: u8) -> Vec<u8> {
    let mut seen = [false; 256];
    let mut picked = Vec::with_capacity(count);

    while picked.len() < count {
        let value = stream.next_byte(picked.len()) % space + offset;
        if !seen[value as usize] {
            seen[value as usize] = true;
            picked.push(value);
        }
    }

    picked.sort_unstable();
    picked
}

/// Seeds consumed by exactly one game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPair {
    pub server_seed: String,
    pub server_seed_hash: String,
    pub client_seed: String,
    pub nonce: u64,
}

/// Per-player seed state, owned by the player record.
///
/// The server seed for the *next* game is generated ahead of time so its
/// commitment can be shown before the player bets.
#[derive(Clone)]
pub struct PlayerSeeds {
    client_seed: String,
    next_server_seed: String,
    next_server_seed_hash: String,
    nonce: u64,
    seed_games_played: u64,
}

impl PlayerSeeds {
    /// Fresh seed state with nonce 0
    pub fn generate() -> CrownwynnResult<Self> {
        let next_server_seed = new_server_seed()?;
        Ok(Self {
            client_seed: new_client_seed()?,
            next_server_seed_hash: commit(&next_server_seed),
            next_server_seed,
            nonce: 0,
            seed_games_played: 0,
        })
    }

    pub fn client_seed(&self) -> &str {
        &self.client_seed
    }

    pub fn next_server_seed_hash(&self) -> &str {
        &self.next_server_seed_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn seed_games_played(&self) -> u64 {
        self.seed_games_played
    }

    /// Return the current nonce and advance it. Callers must hold the
    /// player's transaction.
    pub fn next_nonce(&mut self) -> u64 {
        let nonce = self.nonce;
        self.nonce += 1;
        nonce
    }

    /// Replace the pending server seed, returning the new commitment.
    pub fn rotate(&mut self) -> CrownwynnResult<&str> {
        let seed = new_server_seed()?;
        self.next_server_seed_hash = commit(&seed);
        self.next_server_seed = seed;
        Ok(&self.next_server_seed_hash)
    }

    /// Consume the committed server seed and a nonce for one game, then
    /// rotate so the following game has its own commitment.
    ///
    /// A non-empty `client_seed` applies to this game only.
    pub fn consume(&mut self, client_seed: Option<String>) -> CrownwynnResult<SeedPair> {
        let replacement = new_server_seed()?;
        let nonce = self.next_nonce();
        let server_seed = std::mem::replace(&mut self.next_server_seed, replacement);
        let server_seed_hash = std::mem::replace(
            &mut self.next_server_seed_hash,
            commit(&self.next_server_seed),
        );
        self.seed_games_played += 1;

        let client_seed = client_seed
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.client_seed.clone());

        Ok(SeedPair {
            server_seed,
            server_seed_hash,
            client_seed,
            nonce,
        })
    }

    /// New client seed and a new pending server seed; the per-seed game
    /// counter starts again. The nonce keeps counting.
    pub fn reroll(&mut self) -> CrownwynnResult<()> {
        self.client_seed = new_client_seed()?;
        self.rotate()?;
        self.seed_games_played = 0;
        Ok(())
    }
}

impl fmt::Debug for PlayerSeeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerSeeds")
            .field("client_seed", &self.client_seed)
            .field("next_server_seed", &"<redacted>")
            .field("next_server_seed_hash", &self.next_server_seed_hash)
            .field("nonce", &self.nonce)
            .field("seed_games_played", &self.seed_games_played)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_generation() {
        let a = new_server_seed().unwrap();
        let b = new_server_seed().unwrap();
        assert_eq!(a.len(), SEED_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_commit_known_vectors() {
        assert_eq!(
            commit(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            commit(&"a".repeat(64)),
            "ffe054fe7ae0cb6dc65c3af9b61d5209f439851db43d0ba5997337df154668eb"
        );
    }

    #[test]
    fn test_stream_starts_with_message_digest() {
        let mut stream = HashStream::new(&"a".repeat(64), &"b".repeat(64), 0);
        // sha256("aaaa...:bbbb...:0") = f0a1e4e1...
        assert_eq!(stream.next_byte(0), 0xf0);
        assert_eq!(stream.next_byte(0), 0xa1);
        assert_eq!(stream.next_byte(0), 0xe4);
    }

    #[test]
    fn test_stream_rehashes_after_32_bytes() {
        let mut stream = HashStream::new("s", "c", 7);
        let first: Vec<u8> = (0..32).map(|_| stream.next_byte(3)).collect();
        let next = stream.next_byte(3);

        let expected = Sha256::digest(format!("{}:3", hex::encode(&first)).as_bytes());
        assert_eq!(next, expected[0]);
    }

    #[test]
    fn test_draw_unique_rejects_impossible_requests() {
        assert_eq!(
            draw_unique("s", "c", 0, 26, 25, 0),
            Err(ParameterError::UniqueCount { wanted: 26, space: 25 })
        );
        assert!(draw_unique("s", "c", 0, 1, 0, 0).is_err());
        assert_eq!(draw_unique("s", "c", 0, 25, 25, 0).unwrap(), (0..25).collect::<Vec<u8>>());
    }

    #[test]
    fn test_consume_uses_committed_seed_and_rotates() {
        let mut seeds = PlayerSeeds::generate().unwrap();
        let committed = seeds.next_server_seed_hash().to_string();

        let pair = seeds.consume(None).unwrap();
        assert_eq!(pair.nonce, 0);
        assert_eq!(pair.server_seed_hash, committed);
        assert_eq!(commit(&pair.server_seed), committed);
        assert_eq!(pair.client_seed, seeds.client_seed());
        assert_ne!(seeds.next_server_seed_hash(), committed);
        assert_eq!(seeds.nonce(), 1);
        assert_eq!(seeds.seed_games_played(), 1);

        let custom = seeds.consume(Some("lucky".to_string())).unwrap();
        assert_eq!(custom.nonce, 1);
        assert_eq!(custom.client_seed, "lucky");
        assert_ne!(seeds.client_seed(), "lucky");
    }

    #[test]
    fn test_reroll_keeps_nonce() {
        let mut seeds = PlayerSeeds::generate().unwrap();
        seeds.consume(None).unwrap();
        let old_client = seeds.client_seed().to_string();
        let old_hash = seeds.next_server_seed_hash().to_string();

        seeds.reroll().unwrap();
        assert_ne!(seeds.client_seed(), old_client);
        assert_ne!(seeds.next_server_seed_hash(), old_hash);
        assert_eq!(seeds.seed_games_played(), 0);
        assert_eq!(seeds.nonce(), 1);
    }

    #[test]
    fn test_debug_redacts_server_seed() {
        let seeds = PlayerSeeds::generate().unwrap();
        let rendered = format!("{:?}", seeds);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(&seeds.next_server_seed));
    }
}
