mod checksum;

pub use checksum::cmd_checksum;
