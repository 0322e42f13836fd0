use std::borrow::Cow;

use percent_encoding::percent_decode_str;

pub const SSH_KEYS_PREFIX: &str = "ssh_keys";
pub const HOST_KEYS_PREFIX: &str = "host_keys";

/// Which half of a user key pair an object holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyHalf {
    Private,
    Public,
}

impl KeyHalf {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Private => "pem",
            Self::Public => "pub",
        }
    }

    fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "pem" => Some(Self::Private),
            "pub" => Some(Self::Public),
            _ => None,
        }
    }

    pub fn counterpart(self) -> Self {
        match self {
            Self::Private => Self::Public,
            Self::Public => Self::Private,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyObjectKind {
    SshKey { username: String, half: KeyHalf },
    HostKey,
    Unknown { reason: String },
}

/// File name shared by the bucket object and its local scratch copy.
pub fn key_file_name(username: &str, half: KeyHalf) -> String {
    format!("{username}.{}", half.extension())
}

pub fn ssh_key_object_key(username: &str, half: KeyHalf) -> String {
    format!("{SSH_KEYS_PREFIX}/{}", key_file_name(username, half))
}

pub fn private_key_object_key(username: &str) -> String {
    ssh_key_object_key(username, KeyHalf::Private)
}

pub fn public_key_object_key(username: &str) -> String {
    ssh_key_object_key(username, KeyHalf::Public)
}

pub fn host_key_object_key(file_name: &str) -> String {
    format!("{HOST_KEYS_PREFIX}/{file_name}")
}

pub fn object_file_name(object_key: &str) -> &str {
    object_key.rsplit('/').next().unwrap_or(object_key)
}

/// Decodes an object key as delivered in S3 notifications, where keys are
/// form-encoded (`+` for space, `%XX` for reserved bytes).
pub fn decode_object_key(raw: &str) -> String {
    let spaced: Cow<'_, str> = if raw.contains('+') {
        Cow::Owned(raw.replace('+', " "))
    } else {
        Cow::Borrowed(raw)
    };
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Classifies a key bucket object by its top-level directory.
///
/// A directory containing `host` marks a host key. A directory containing
/// `ssh` marks a user key, which must be named `<username>.pem` or
/// `<username>.pub`; anything else is reported as `Unknown`.
pub fn classify_object_key(object_key: &str) -> KeyObjectKind {
    let Some((directory, _)) = object_key.split_once('/') else {
        return unknown(format!("object key '{object_key}' has no directory prefix"));
    };

    let file_name = object_file_name(object_key);
    if file_name.is_empty() {
        return unknown(format!("object key '{object_key}' names a directory"));
    }

    if directory.contains("host") {
        return KeyObjectKind::HostKey;
    }

    if !directory.contains("ssh") {
        return unknown(format!(
            "directory '{directory}' is neither an ssh key nor a host key location"
        ));
    }

    let Some((username, extension)) = file_name.rsplit_once('.') else {
        return unknown(format!("ssh key '{file_name}' has no extension"));
    };

    match KeyHalf::from_extension(extension) {
        Some(half) if !username.is_empty() => KeyObjectKind::SshKey {
            username: username.to_string(),
            half,
        },
        Some(_) => unknown(format!("ssh key '{file_name}' has an empty user name")),
        None => unknown(format!(
            "ssh key '{file_name}' must end in .pem or .pub"
        )),
    }
}

fn unknown(reason: String) -> KeyObjectKind {
    KeyObjectKind::Unknown { reason }
}
