//! Random passwords and profile identifiers.
//!
//! Every value is generated fresh from an [`EntropySource`]; nothing is cached
//! or logged. The default source is the operating system CSPRNG, which is
//! safe to share between concurrent provisioning runs.

use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::SecretString;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub const PASSWORD_LENGTH: usize = 16;

/// Symbols a generated password is drawn from.
pub const PASSWORD_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()-_=+";

/// Punctuation subset of [`PASSWORD_ALPHABET`].
pub const PASSWORD_SYMBOLS: &[u8] = b"!@#$%^&*()-_=+";

/// Prefix marking a password produced by the clock-derived fallback. Covers
/// all four character classes on its own.
pub const FALLBACK_TAG: &str = "Fx9!";

/// Bytes at or above this bound are rejected so that `byte % len` stays uniform.
const ACCEPT_BOUND: usize = 256 - (256 % PASSWORD_ALPHABET.len());

/// Candidates missing a character class are redrawn; a single draw fails the
/// class check roughly 4% of the time.
const MAX_PASSWORD_ATTEMPTS: usize = 32;

/// Refills of the byte buffer allowed while assembling one candidate.
const MAX_FILL_ROUNDS: usize = 16;

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Secure random source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Secure random source unavailable and fallback clock failed")]
    ClockUnavailable,

    #[error("Random source did not yield a usable password after {0} attempts")]
    Exhausted(usize),
}

/// Thread-safe supplier of random bytes.
pub trait EntropySource: Send + Sync {
    fn fill(&self, dest: &mut [u8]) -> Result<(), rand::Error>;
}

/// Operating system CSPRNG. Stateless, so no locking is required.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), rand::Error> {
        OsRng.try_fill_bytes(dest)
    }
}

/// Wraps a stateful generator behind a mutex so overlapping requests never
/// observe the same output.
pub struct LockedRng<R> {
    inner: Mutex<R>,
}

impl<R: RngCore + Send> LockedRng<R> {
    pub fn new(rng: R) -> Self {
        Self {
            inner: Mutex::new(rng),
        }
    }
}

impl<R: RngCore + Send> EntropySource for LockedRng<R> {
    fn fill(&self, dest: &mut [u8]) -> Result<(), rand::Error> {
        let mut rng = self
            .inner
            .lock()
            .map_err(|_| rand::Error::new("entropy lock poisoned"))?;
        rng.try_fill_bytes(dest)
    }
}

/// Nanoseconds since the Unix epoch, or `None` if the clock is unusable.
pub type Clock = fn() -> Option<u128>;

fn system_clock() -> Option<u128> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .map(|elapsed| elapsed.as_nanos())
}

pub struct CredentialGenerator {
    source: Box<dyn EntropySource>,
    clock: Clock,
}

impl Default for CredentialGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialGenerator {
    pub fn new() -> Self {
        Self::with_source(OsEntropy)
    }

    pub fn with_source(source: impl EntropySource + 'static) -> Self {
        Self {
            source: Box::new(source),
            clock: system_clock,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// A 16-symbol password with at least one uppercase letter, lowercase
    /// letter, digit and symbol.
    pub fn generate_password(&self) -> Result<SecretString, GenerationError> {
        for _ in 0..MAX_PASSWORD_ATTEMPTS {
            let candidate = match self.sample_password() {
                Ok(candidate) => candidate,
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        "Secure random source unavailable, using clock-derived password"
                    );
                    return self.fallback_password();
                }
            };

            if has_every_class(&candidate) {
                return Ok(SecretString::new(candidate));
            }
        }

        Err(GenerationError::Exhausted(MAX_PASSWORD_ATTEMPTS))
    }

    /// A random RFC 4122 version 4 UUID, lowercase and hyphenated.
    pub fn generate_identifier(&self) -> Result<String, GenerationError> {
        let mut bytes = [0u8; 16];
        self.source
            .fill(&mut bytes)
            .map_err(|e| GenerationError::EntropyUnavailable(e.to_string()))?;

        Ok(uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .hyphenated()
            .to_string())
    }

    fn sample_password(&self) -> Result<String, rand::Error> {
        let mut password = String::with_capacity(PASSWORD_LENGTH);
        let mut buffer = [0u8; 32];

        for _ in 0..MAX_FILL_ROUNDS {
            self.source.fill(&mut buffer)?;
            for byte in buffer.iter().map(|b| *b as usize) {
                if byte >= ACCEPT_BOUND {
                    continue;
                }
                password.push(PASSWORD_ALPHABET[byte % PASSWORD_ALPHABET.len()] as char);
                if password.len() == PASSWORD_LENGTH {
                    return Ok(password);
                }
            }
        }

        Err(rand::Error::new("random source kept producing out-of-range bytes"))
    }

    fn fallback_password(&self) -> Result<SecretString, GenerationError> {
        let nanos = (self.clock)().ok_or(GenerationError::ClockUnavailable)?;
        let sequence = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);

        let digest = Sha256::new()
            .chain_update(nanos.to_le_bytes())
            .chain_update(sequence.to_le_bytes())
            .chain_update(std::process::id().to_le_bytes())
            .finalize();

        let mut password = String::with_capacity(PASSWORD_LENGTH);
        password.push_str(FALLBACK_TAG);
        password.extend(
            digest
                .iter()
                .take(PASSWORD_LENGTH - FALLBACK_TAG.len())
                .map(|b| PASSWORD_ALPHABET[*b as usize % PASSWORD_ALPHABET.len()] as char),
        );

        Ok(SecretString::new(password))
    }
}

fn has_every_class(password: &str) -> bool {
    let bytes = password.as_bytes();
    bytes.iter().any(u8::is_ascii_uppercase)
        && bytes.iter().any(u8::is_ascii_lowercase)
        && bytes.iter().any(u8::is_ascii_digit)
        && bytes.iter().any(|b| PASSWORD_SYMBOLS.contains(b))
}
