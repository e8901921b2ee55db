//! File locations for one shard round.

use std::path::{Path, PathBuf};

use crate::config::ShardConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardJob {
    pub shard: u32,
    /// Freshly split shard file.
    pub input: PathBuf,
    /// Output of the previous round; missing means first run.
    pub previous: PathBuf,
    /// Where the retained set is written.
    pub output: PathBuf,
}

impl ShardJob {
    /// `<input_dir>/part_NN.txt` in, `<output_dir>/validated_part_NN.txt` out.
    /// The previous round's output is the same file as this round's.
    pub fn from_config(config: &ShardConfig, shard: u32) -> Self {
        let output = Path::new(&config.output_dir).join(format!("validated_part_{shard:02}.txt"));
        Self {
            shard,
            input: Path::new(&config.input_dir).join(format!("part_{shard:02}.txt")),
            previous: output.clone(),
            output,
        }
    }
}
