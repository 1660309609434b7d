//! Login, signup and password reset forms.

use blogify_core::ports::AuthError;
use blogify_core::routing::Route;
use blogify_infra::auth::MIN_PASSWORD_LEN;
use blogify_shared::dto::{LoginRequest, RegisterRequest, ResetPasswordRequest};
use serde::Serialize;

use super::Navbar;

pub const MISSING_FIELDS: &str = "Please fill in all fields";
pub const PASSWORD_MISMATCH: &str = "Passwords do not match";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";
pub const MISSING_EMAIL: &str = "Please enter your email";
pub const RESET_SENT: &str = "Password reset link sent! Check your email inbox.";

#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub placeholder: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormLink {
    pub prompt: &'static str,
    pub label: &'static str,
    pub href: &'static str,
}

/// One of the public authentication pages.
#[derive(Debug, Clone, Serialize)]
pub struct AuthFormPage {
    pub navbar: Navbar,
    pub title: &'static str,
    pub fields: Vec<FormField>,
    pub submit_label: &'static str,
    pub submit_to: &'static str,
    pub links: Vec<FormLink>,
}

const EMAIL: FormField = FormField {
    name: "email",
    label: "Email",
    input_type: "email",
    placeholder: "Enter your email",
};

impl AuthFormPage {
    pub fn login() -> Self {
        Self {
            navbar: Navbar::new(Some(Route::Login), false),
            title: "Welcome Back!",
            fields: vec![
                EMAIL,
                FormField {
                    name: "password",
                    label: "Password",
                    input_type: "password",
                    placeholder: "Enter your password",
                },
            ],
            submit_label: "Log In",
            submit_to: "/api/auth/login",
            links: vec![
                FormLink {
                    prompt: "",
                    label: "Forgot Password?",
                    href: Route::ForgotPassword.path(),
                },
                FormLink {
                    prompt: "Don't have an account?",
                    label: "Sign Up",
                    href: Route::Signup.path(),
                },
            ],
        }
    }

    pub fn signup() -> Self {
        Self {
            navbar: Navbar::new(Some(Route::Signup), false),
            title: "Join Blogify Today!",
            fields: vec![
                FormField {
                    name: "displayName",
                    label: "Name",
                    input_type: "text",
                    placeholder: "Enter your full name",
                },
                EMAIL,
                FormField {
                    name: "password",
                    label: "Password",
                    input_type: "password",
                    placeholder: "Create a password (min 6 characters)",
                },
                FormField {
                    name: "confirmPassword",
                    label: "Confirm Password",
                    input_type: "password",
                    placeholder: "Confirm your password",
                },
            ],
            submit_label: "Sign Up",
            submit_to: "/api/auth/register",
            links: vec![FormLink {
                prompt: "Already have an account?",
                label: "Log In",
                href: Route::Login.path(),
            }],
        }
    }

    pub fn forgot_password() -> Self {
        Self {
            navbar: Navbar::new(Some(Route::ForgotPassword), false),
            title: "Reset Your Password",
            fields: vec![FormField {
                placeholder: "Enter your email address",
                ..EMAIL
            }],
            submit_label: "Send Reset Link",
            submit_to: "/api/auth/reset-password",
            links: vec![
                FormLink {
                    prompt: "Remember your password?",
                    label: "Log In",
                    href: Route::Login.path(),
                },
                FormLink {
                    prompt: "Don't have an account?",
                    label: "Sign Up",
                    href: Route::Signup.path(),
                },
            ],
        }
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Client-side checks of the signup form, in the order they are reported.
pub fn validate_signup(req: &RegisterRequest) -> Result<(), &'static str> {
    let name = req.display_name.as_deref().unwrap_or_default();
    if [name, req.email.as_str(), req.password.as_str(), req.confirm_password.as_str()]
        .into_iter()
        .any(blank)
    {
        return Err(MISSING_FIELDS);
    }
    if req.password != req.confirm_password {
        return Err(PASSWORD_MISMATCH);
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PASSWORD_TOO_SHORT);
    }
    Ok(())
}

pub fn validate_login(req: &LoginRequest) -> Result<(), &'static str> {
    if blank(&req.email) || blank(&req.password) {
        return Err(MISSING_FIELDS);
    }
    Ok(())
}

pub fn validate_reset(req: &ResetPasswordRequest) -> Result<(), &'static str> {
    if blank(&req.email) {
        return Err(MISSING_EMAIL);
    }
    Ok(())
}

pub fn signup_error_message(err: &AuthError) -> &'static str {
    match err {
        AuthError::EmailInUse => "Email already in use. Please try logging in.",
        AuthError::WeakPassword => "Password is too weak. Please use a stronger password.",
        _ => "Failed to create account. Please try again.",
    }
}

pub fn login_error_message(_err: &AuthError) -> &'static str {
    "Failed to log in. Please check your email and password."
}

pub fn reset_error_message(err: &AuthError) -> &'static str {
    match err {
        AuthError::UserNotFound => "No account found with this email.",
        _ => "Failed to send reset email. Please try again.",
    }
}
