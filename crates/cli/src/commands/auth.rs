//! Account commands: login, register, logout, whoami.
//!
//! # Usage
//!
//! ```bash
//! ticketflow register -n "Alice" -e alice@example.com
//! ticketflow login -e alice@example.com
//! ticketflow whoami
//! ticketflow logout
//! ```

use std::io::{BufRead, Write};

use ticketflow_core::input::{Credentials, Registration};
use ticketflow_storefront::Storefront;
use ticketflow_storefront::error::StorefrontError;
use ticketflow_storefront::session::AccountView;

/// Use the `--password` value, or read one line from stdin.
#[allow(clippy::print_stderr)]
fn password_or_prompt(password: Option<String>) -> String {
    if let Some(password) = password {
        return password;
    }

    eprint!("Password: ");
    let _ = std::io::stderr().flush();
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line).is_err() {
        line.clear();
    }
    line
}

/// Sign in and persist the session.
///
/// # Errors
///
/// Returns an error if the form input is invalid or the service rejects it.
#[allow(clippy::print_stdout)]
pub async fn login(
    storefront: &Storefront,
    email: &str,
    password: Option<String>,
) -> Result<(), StorefrontError> {
    let password = password_or_prompt(password);
    let credentials = Credentials::from_form(email, &password)?;

    let user = storefront.session().login_with(&credentials).await?;
    println!("Signed in as {} <{}>", user.name, user.email);
    Ok(())
}

/// Create an account and sign in.
///
/// # Errors
///
/// Returns an error if the form input is invalid or the service rejects it.
#[allow(clippy::print_stdout)]
pub async fn register(
    storefront: &Storefront,
    name: &str,
    email: &str,
    password: Option<String>,
) -> Result<(), StorefrontError> {
    let password = password_or_prompt(password);
    let registration = Registration::from_form(name, email, &password)?;

    let user = storefront.session().register_with(&registration).await?;
    println!("Welcome, {}! You are signed in as {}", user.name, user.email);
    Ok(())
}

/// Sign out.
///
/// # Errors
///
/// Returns an error if the stored session could not be removed.
#[allow(clippy::print_stdout)]
pub async fn logout(storefront: &Storefront) -> Result<(), StorefrontError> {
    storefront.session().logout().await?;
    println!("Signed out");
    Ok(())
}

/// Print the account header.
#[allow(clippy::print_stdout)]
pub async fn whoami(storefront: &Storefront) {
    let session = storefront.session().snapshot().await;
    match session.account_view() {
        AccountView::SignedIn(user) => {
            println!("{} <{}> ({})", user.name, user.email, user.role);
        }
        AccountView::SignedOut => {
            println!("Not signed in. Run `ticketflow login` or `ticketflow register`.");
        }
        AccountView::Pending => {}
    }
}
