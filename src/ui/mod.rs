pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    error, field, header, muted, note, profile_banner, section, server_started, success, warn,
};
pub use table::{profiles_table, TableBuilder};
pub use theme::{theme, Theme};
