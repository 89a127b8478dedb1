//! # Workspace Constants
//!
//! Defaults shared by the core library and the inspection tool.
//!
//! **NOTE:** `DEFAULT_PACK_FILE` is the name existing cache files were
//! written under. Changing it orphans every pack already on disk.

// =============================================================================
// PERSISTENCE
// =============================================================================

/// File name used when no pack path is configured
pub const DEFAULT_PACK_FILE: &str = "FCloudPackDefault.txt";

/// Cloud tag used when no tag is configured
pub const DEFAULT_CLOUD_TAG: &str = "Default";

// =============================================================================
// VOXELIZATION
// =============================================================================

/// Distance a probe endpoint is pushed outward when it coincides with a sample
pub const DEFAULT_PROBE_NUDGE: f32 = 1.0;

// =============================================================================
// RESAMPLING
// =============================================================================

/// Number of lattice corners averaged per pixel (one unit cell)
pub const CELL_CORNERS: u32 = 8;

/// Pixel intensity reached when all eight corners are occupied
pub const DEFAULT_INTENSITY_SCALE: f32 = 256.0;

/// Slice values at or above this threshold render as solid in ASCII dumps
pub const ASCII_SOLID_THRESHOLD: f32 = 1.0;
