/// Deepest octree level a node may be split to. Coincident points stop here
/// instead of recursing without bound.
pub const MAX_OCTREE_DEPTH: usize = 16;

/// Prime multiplier used to derive per-agent RNG streams from a base seed.
pub const RNG_DERIVATION_PRIME: u64 = 7919;

/// Squared-length threshold below which a vector is treated as zero.
pub const VECTOR_EPSILON_SQ: f32 = 1.0e-14;

/// Per-agent rose pattern phases; agents past the end wrap around.
pub const ROSE_PHASES: [f32; 8] = [0.0, 0.0, 3.0, 3.0, 5.0, 5.0, 7.0, 7.0];
