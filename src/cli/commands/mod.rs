mod password;
mod user;

pub use password::cmd_password;
pub use user::{
    cmd_user_activate, cmd_user_add, cmd_user_delete, cmd_user_list, cmd_user_reset_password,
    cmd_user_show,
};
