// The pure half of the engine. Every function in this tree is a
// deterministic function of its string arguments — no I/O, no clocks,
// no randomness, no ambient state. The automatons are LazyLock statics,
// which is as stateful as things get in here.

pub mod category;
pub mod fingerprint;
pub mod intent;
pub mod quality;
pub mod sentiment;
pub mod tokenizer;
