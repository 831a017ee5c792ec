use anyhow::Result;

/// Generate a 6-digit numeric one-time code.
///
/// The code is stored server-side next to its expiry, so it can be
/// invalidated on use and superseded by a resend.
pub fn generate_otp() -> Result<String> {
    let mut buf = [0u8; 4];
    getrandom::getrandom(&mut buf)
        .map_err(|e| anyhow::anyhow!("Failed to read system randomness: {}", e))?;
    let n = u32::from_le_bytes(buf);
    Ok(format!("{:06}", 100000 + n % 900000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp().unwrap();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn otp_never_has_leading_zero() {
        for _ in 0..100 {
            let otp = generate_otp().unwrap();
            let value: u32 = otp.parse().unwrap();
            assert!((100000..1000000).contains(&value));
        }
    }

    #[test]
    fn otps_vary() {
        let first = generate_otp().unwrap();
        let mut saw_different = false;
        for _ in 0..20 {
            if generate_otp().unwrap() != first {
                saw_different = true;
                break;
            }
        }
        assert!(saw_different);
    }
}
