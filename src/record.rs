use url::Url;

/// The seven record fields, in serialization order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Scheme,
    Userinfo,
    Host,
    Port,
    Path,
    Query,
    Fragment,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Scheme,
        Field::Userinfo,
        Field::Host,
        Field::Port,
        Field::Path,
        Field::Query,
        Field::Fragment,
    ];

    /// Key used for this field in the record line
    pub fn name(self) -> &'static str {
        match self {
            Field::Scheme => "scheme",
            Field::Userinfo => "userinfo",
            Field::Host => "host",
            Field::Port => "port",
            Field::Path => "path",
            Field::Query => "query",
            Field::Fragment => "fragment",
        }
    }
}

/// Components of one parsed URL.
///
/// `None` means the library reported the component as absent, which is
/// distinct from `Some(String::new())` here even though both serialize to
/// the same encoded value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedUrlRecord {
    pub scheme: Option<String>,
    pub userinfo: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl ParsedUrlRecord {
    /// Textual form of a field, or `None` when it is absent.
    /// The port is rendered as decimal digits.
    pub fn get(&self, field: Field) -> Option<String> {
        match field {
            Field::Scheme => self.scheme.clone(),
            Field::Userinfo => self.userinfo.clone(),
            Field::Host => self.host.clone(),
            Field::Port => self.port.map(|port| port.to_string()),
            Field::Path => self.path.clone(),
            Field::Query => self.query.clone(),
            Field::Fragment => self.fragment.clone(),
        }
    }
}

/// Username followed by `:password` only when a password exists.
/// Always produces a string, possibly empty.
pub fn userinfo(username: &str, password: Option<&str>) -> String {
    match password {
        Some(password) => format!("{username}:{password}"),
        None => username.to_string(),
    }
}

impl From<&Url> for ParsedUrlRecord {
    fn from(url: &Url) -> Self {
        ParsedUrlRecord {
            scheme: Some(url.scheme().to_string()),
            userinfo: Some(userinfo(url.username(), url.password())),
            host: url.host_str().map(String::from),
            // Scheme defaults are resolved, `http://example.com` has port 80
            port: url.port_or_known_default(),
            path: Some(url.path().to_string()),
            query: url.query().map(String::from),
            fragment: url.fragment().map(String::from),
        }
    }
}
