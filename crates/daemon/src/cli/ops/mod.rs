pub mod mount;
pub mod umount;

pub use mount::Mount;
pub use umount::Umount;
