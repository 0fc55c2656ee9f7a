//! HTML bodies for OTP emails.

use kuppi_core::OtpPurpose;

/// Subject and HTML body of an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub html: String,
}

/// Render the email for a freshly issued code.
pub fn render_otp_message(purpose: OtpPurpose, code: &str, expiry_secs: u64) -> RenderedMessage {
    let (subject, heading, intro) = match purpose {
        OtpPurpose::Signup => (
            "Your Kuppi Verification Code",
            "Welcome to Kuppi",
            "Use the code below to finish creating your account.",
        ),
        OtpPurpose::PasswordReset => (
            "Your Password Reset OTP",
            "Password Reset Request",
            "You requested a password reset. Use the OTP below to proceed.",
        ),
    };

    RenderedMessage {
        subject: subject.to_string(),
        html: format!(
            r#"<div style="max-width: 600px; margin: 40px auto; padding: 25px 20px; border-radius: 12px; background-color: #000000; text-align: center; font-family: Arial, sans-serif; border: 2px solid #ffffff;">
  <h1 style="background-color: #2581eb; color: #ffffff; padding: 20px; border-radius: 12px; font-size: 24px;">{heading}</h1>
  <p style="font-size: 20px; font-weight: 600; color: #ffffff; margin-bottom: 40px;">{intro}</p>
  <div style="display: inline-block; background-color: #f4f4f4; padding: 15px 30px; border-radius: 12px; font-size: 32px; font-weight: bold; color: #2c3e50; letter-spacing: 4px;">{code}</div>
  <p style="font-size: 16px; color: #cfdadb; margin-top: 20px;">This OTP will expire in <strong>{expiry}</strong>.</p>
  <hr style="border: none; border-top: 1px solid #444;">
  <p style="font-size: 14px; color: #cfdadb;">If you did not request this OTP, please ignore this email.</p>
</div>"#,
            heading = heading,
            intro = intro,
            code = code,
            expiry = describe_expiry(expiry_secs),
        ),
    }
}

fn describe_expiry(secs: u64) -> String {
    let minutes = secs / 60;
    match (minutes, secs % 60) {
        (0, s) => format!("{} seconds", s),
        (1, 0) => "1 minute".to_string(),
        (m, 0) => format!("{} minutes", m),
        _ => format!("{} seconds", secs),
    }
}
