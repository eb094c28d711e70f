use anyhow::anyhow;

use crate::auth::password::hash_password;

pub fn run(password: &str) -> anyhow::Result<()> {
    if password.is_empty() {
        anyhow::bail!("password must not be empty");
    }
    let hash = hash_password(password).map_err(|e| anyhow!("failed to hash password: {}", e))?;
    println!("{}", hash);
    Ok(())
}
