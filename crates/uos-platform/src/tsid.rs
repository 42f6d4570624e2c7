//! TSID Generation
//!
//! Time-sorted identifiers encoded as 13-character Crockford Base32 strings.
//! Layout: 42 bits of milliseconds since the custom epoch, 22 bits of
//! per-millisecond counter seeded randomly. Lexicographic order follows
//! creation order.

use rand::Rng;
use std::sync::Mutex;

const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// 2020-01-01T00:00:00Z
const EPOCH_MS: i64 = 1_577_836_800_000;

/// Counter is seeded in the lower half of its 22-bit range so that bursts
/// within one millisecond keep incrementing without wrapping.
const COUNTER_SEED_MAX: u32 = 1 << 21;
const COUNTER_MAX: u32 = (1 << 22) - 1;

struct TsidState {
    last_ms: i64,
    counter: u32,
}

static STATE: Mutex<TsidState> = Mutex::new(TsidState { last_ms: 0, counter: 0 });

pub struct TsidGenerator;

impl TsidGenerator {
    /// Generate a new TSID string.
    pub fn generate() -> String {
        let now = chrono::Utc::now().timestamp_millis();
        let mut state = STATE.lock().unwrap();

        if now > state.last_ms {
            state.last_ms = now;
            state.counter = rand::thread_rng().gen_range(0..COUNTER_SEED_MAX);
        } else if state.counter < COUNTER_MAX {
            state.counter += 1;
        } else {
            // Counter exhausted within one millisecond: borrow from the next.
            state.last_ms += 1;
            state.counter = 0;
        }

        let millis = (state.last_ms - EPOCH_MS).max(0) as u64;
        let value = (millis << 22) | state.counter as u64;
        encode(value)
    }
}

fn encode(mut value: u64) -> String {
    let mut out = [0u8; 13];
    for slot in out.iter_mut().rev() {
        *slot = ALPHABET[(value & 0x1F) as usize];
        value >>= 5;
    }
    // The alphabet is ASCII, so this cannot fail.
    String::from_utf8(out.to_vec()).unwrap_or_default()
}
