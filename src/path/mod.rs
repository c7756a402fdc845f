/*!
 * Path handling: normalization across Windows/POSIX/Git-Bash/WSL
 * conventions and destination layout for batch transfers
 */

mod canonical;
mod layout;
mod normalize;

pub use canonical::{CanonicalPath, Root};
pub use layout::{create_dest_path, ensure_unique_path, PathStyle};
pub use normalize::{
    detect_form, existence_candidates, expand_user, fix_path_separators, normalize,
    normalize_path, path_exists_cross_platform, PathForm,
};
