//! Signed-in user, role and the dashboard each role lands on.

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "CLIENT")]
    Client,
    #[serde(rename = "VENDEUR")]
    Vendor,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl Role {
    pub fn code(self) -> &'static str {
        match self {
            Role::Client => "CLIENT",
            Role::Vendor => "VENDEUR",
            Role::Admin => "ADMIN",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    #[serde(rename = "pays", default)]
    pub country: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(rename = "ville", default)]
    pub city: Option<String>,
    #[serde(default)]
    pub commune: Option<String>,
    #[serde(rename = "quartier", default)]
    pub neighborhood: Option<String>,
    #[serde(rename = "avenue", default)]
    pub street: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

/// Profile as stored by the users service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Backend id, falling back to the identity provider uid.
    #[serde(alias = "uid")]
    pub id: String,
    #[serde(rename = "nom", default)]
    pub last_name: String,
    #[serde(rename = "prenom", default)]
    pub first_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(rename = "telephone", default)]
    pub phone: Option<String>,
    #[serde(rename = "adresse", default)]
    pub address: Option<PostalAddress>,
    #[serde(rename = "photoProfil", default)]
    pub photo_url: Option<String>,
}

fn default_role() -> Role {
    Role::Client
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// First letters of first and last name, used when there is no photo.
    pub fn initials(&self) -> String {
        self.first_name
            .chars()
            .next()
            .into_iter()
            .chain(self.last_name.chars().next())
            .collect::<String>()
            .to_uppercase()
    }
}

/// Body of `POST /users/register`.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    #[serde(rename = "nom")]
    pub last_name: String,
    #[serde(rename = "prenom")]
    pub first_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(rename = "telephone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "adresse", skip_serializing_if = "Option::is_none")]
    pub address: Option<PostalAddress>,
}

impl Registration {
    pub const MIN_PASSWORD_LEN: usize = 6;

    pub fn validate(&self, confirm_password: &str) -> Result<(), DomainError> {
        if self.password != confirm_password {
            return Err(DomainError::InvalidInput("Passwords do not match".to_string()));
        }
        if self.password.chars().count() < Self::MIN_PASSWORD_LEN {
            return Err(DomainError::InvalidInput(format!(
                "Password must be at least {} characters",
                Self::MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

/// The authenticated user for the lifetime of one client session. Passed
/// explicitly to everything that acts on the user's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    profile: UserProfile,
}

impl Session {
    pub fn new(profile: UserProfile) -> Self {
        Self { profile }
    }

    pub fn user_id(&self) -> &str {
        &self.profile.id
    }

    pub fn role(&self) -> Role {
        self.profile.role
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard::for_role(self.role())
    }

    /// Err unless the session's role is one of `allowed`.
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), DomainError> {
        if allowed.contains(&self.role()) {
            Ok(())
        } else {
            Err(DomainError::InvalidInput(format!(
                "role {} is not allowed here",
                self.role().code()
            )))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardCard {
    pub icon: &'static str,
    pub title: &'static str,
    pub caption: &'static str,
}

const fn card(icon: &'static str, title: &'static str, caption: &'static str) -> DashboardCard {
    DashboardCard {
        icon,
        title,
        caption,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dashboard {
    Client,
    Vendor,
    Admin,
}

impl Dashboard {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Client => Dashboard::Client,
            Role::Vendor => Dashboard::Vendor,
            Role::Admin => Dashboard::Admin,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Dashboard::Client => "🛒 Client area",
            Dashboard::Vendor => "🏪 Vendor area",
            Dashboard::Admin => "⚙️ Administration",
        }
    }

    pub fn cards(self) -> &'static [DashboardCard] {
        const CLIENT: [DashboardCard; 4] = [
            card("🛍️", "My orders", "Track your current orders"),
            card("🛒", "My cart", "Items in your cart"),
            card("❤️", "Favourites", "Products you like"),
            card("👤", "My profile", "Manage your details"),
        ];
        const VENDOR: [DashboardCard; 4] = [
            card("📦", "My products", "Manage your catalog"),
            card("📊", "Received orders", "Orders to process"),
            card("💰", "Revenue", "Sales statistics"),
            card("➕", "Add product", "New product"),
        ];
        const ADMIN: [DashboardCard; 6] = [
            card("👥", "Users", "Manage accounts"),
            card("🏪", "Vendors", "Approve vendors"),
            card("📦", "Products", "Moderate the catalog"),
            card("📊", "Statistics", "Overview"),
            card("💳", "Payments", "Transactions"),
            card("🔧", "Settings", "Configuration"),
        ];
        match self {
            Dashboard::Client => &CLIENT,
            Dashboard::Vendor => &VENDOR,
            Dashboard::Admin => &ADMIN,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_profile(id: &str, role: Role) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        last_name: "Mukendi".to_string(),
        first_name: "Grace".to_string(),
        email: "grace@example.com".to_string(),
        role,
        phone: None,
        address: None,
        photo_url: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_id_falls_back_to_uid() {
        let profile: UserProfile = serde_json::from_value(json!({
            "uid": "firebase-uid",
            "nom": "Kabila",
            "prenom": "Joseph",
            "email": "j@example.com",
            "role": "VENDEUR"
        }))
        .expect("valid profile");
        assert_eq!(profile.id, "firebase-uid");
        assert_eq!(profile.role, Role::Vendor);
        assert_eq!(profile.initials(), "JK");
    }

    #[test]
    fn each_role_gets_its_dashboard() {
        assert_eq!(Dashboard::for_role(Role::Client), Dashboard::Client);
        assert_eq!(Dashboard::for_role(Role::Vendor).cards().len(), 4);
        assert_eq!(Dashboard::for_role(Role::Admin).cards().len(), 6);
    }

    #[test]
    fn role_gate() {
        let session = Session::new(sample_profile("u1", Role::Client));
        assert!(session.require_role(&[Role::Client]).is_ok());
        assert!(session.require_role(&[Role::Admin, Role::Vendor]).is_err());
    }

    #[test]
    fn registration_checks_passwords() {
        let reg = Registration {
            last_name: "K".to_string(),
            first_name: "J".to_string(),
            email: "j@example.com".to_string(),
            password: "abc".to_string(),
            role: Role::Client,
            phone: None,
            address: None,
        };
        assert!(reg.validate("abd").is_err());
        assert!(reg.validate("abc").is_err());

        let reg = Registration {
            password: "secret1".to_string(),
            ..reg
        };
        assert!(reg.validate("secret1").is_ok());
        let body = serde_json::to_value(&reg).unwrap();
        assert_eq!(body["prenom"], "J");
        assert_eq!(body["role"], "CLIENT");
        assert!(body.get("telephone").is_none());
    }
}
