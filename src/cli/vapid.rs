use crate::notify::VapidKeys;

/// Print a fresh key pair as environment variables.
pub fn run(subject: &str) {
    let keys = VapidKeys::generate();
    println!("VAPID_PUBLIC_KEY={}", keys.public_key_base64url());
    println!("VAPID_PRIVATE_KEY={}", keys.private_key_base64url());
    println!("VAPID_SUBJECT={}", subject);
}
