//! Boot-time configuration

use vps_core::InitialPassword;

/// Cloud-init document setting the default user's password without forcing
/// a change on first login.
///
/// The password is double-quoted: the generator's alphabet has no quotes or
/// backslashes, and a leading `*`, `&` or `@` would otherwise be read as YAML
/// syntax.
pub fn password_user_data(password: &InitialPassword) -> String {
    format!(
        "#cloud-config\npassword: \"{}\"\nchpasswd: {{ expire: False }}\nssh_pwauth: True\n",
        password.as_str()
    )
}
