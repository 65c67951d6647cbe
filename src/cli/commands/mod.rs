//! One module per subcommand (or subcommand group).

pub mod add;
pub mod archive;
pub mod audit_cmd;
pub mod completions;
pub mod delete;
pub mod edit;
pub mod init;
pub mod list;
pub mod password;
pub mod records;
pub mod show;
pub mod ssl;
