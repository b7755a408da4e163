//! Password generation command handler

use crate::state::SharedState;

pub fn cmd_password(
    state: &SharedState,
    length: Option<usize>,
    min_upper: Option<usize>,
    min_digits: Option<usize>,
    min_special: Option<usize>,
) -> anyhow::Result<()> {
    let password = if length.is_none()
        && min_upper.is_none()
        && min_digits.is_none()
        && min_special.is_none()
    {
        state.user_service.generate_password()?
    } else {
        let policy = &state.config.security.password_policy;
        state.password_generator.generate(
            length.unwrap_or(policy.length),
            min_upper.unwrap_or(policy.min_uppercase),
            min_digits.unwrap_or(policy.min_digits),
            min_special.unwrap_or(policy.min_special),
        )?
    };

    println!("{password}");
    Ok(())
}
