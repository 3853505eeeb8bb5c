/// The closed set of verbs a session understands. Anything else is a bad
/// request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Echo,
    Time,
    Stime,
    Help,
    Tree,
    Mkdir,
    Rm,
    Download,
    Upload,
    UdpDownload,
    UdpUpload,
    Logout,
    Shutdown,
}

impl Command {
    pub fn from_verb(verb: &str) -> Option<Command> {
        match verb {
            "echo" => Some(Command::Echo),
            "time" => Some(Command::Time),
            "stime" => Some(Command::Stime),
            "help" => Some(Command::Help),
            "tree" => Some(Command::Tree),
            "mkdir" => Some(Command::Mkdir),
            "rm" => Some(Command::Rm),
            "download" => Some(Command::Download),
            "upload" => Some(Command::Upload),
            "udpdownload" => Some(Command::UdpDownload),
            "udpupload" => Some(Command::UdpUpload),
            "logout" => Some(Command::Logout),
            "shutdown" => Some(Command::Shutdown),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_known_verb() {
        assert_eq!(Command::from_verb("echo"), Some(Command::Echo));
        assert_eq!(Command::from_verb("udpdownload"), Some(Command::UdpDownload));
        assert_eq!(Command::from_verb("shutdown"), Some(Command::Shutdown));
    }

    #[test]
    fn verbs_are_case_sensitive_and_closed() {
        assert_eq!(Command::from_verb("ECHO"), None);
        assert_eq!(Command::from_verb("quit"), None);
        assert_eq!(Command::from_verb(""), None);
    }
}
