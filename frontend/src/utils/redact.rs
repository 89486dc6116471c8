/// Masks the local part of an email for log output: `user@example.com`
/// becomes `us***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => format!("{}@{}", mask(local), domain),
        None => mask(email),
    }
}

fn mask(text: &str) -> String {
    let count = text.chars().count();
    if count <= 2 {
        return "*".repeat(count);
    }
    let visible: String = text.chars().take(2).collect();
    format!("{}***", visible)
}
