use std::io;
use std::path::Path;

/// Asset attribute holding a user-edited capture date.
pub const CUSTOM_CREATION_DATE_ATTR: &str = "com.apple.assetsd.customCreationDate";
/// Asset attribute holding the date the file entered the photo library.
pub const ADDED_DATE_ATTR: &str = "com.apple.assetsd.addedDate";

/// Reads the raw payload of a named extended attribute.
///
/// `Ok(None)` means the attribute is not set on the file (`xattr` already maps
/// ENODATA/ENOATTR to it); `Err` is reserved for real read failures
/// (permissions, vanished file, unsupported fs).
pub fn read_attribute(name: &str, path: &Path) -> io::Result<Option<Vec<u8>>> {
    xattr::get(path, name)
}
