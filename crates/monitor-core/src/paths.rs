use crate::session::SessionId;

pub fn transcript(id: &SessionId) -> String {
    format!("transcripts/{}.json", id.as_str())
}

pub fn summary(id: &SessionId) -> String {
    format!("summaries/{}.json", id.as_str())
}

pub fn skill(id: &SessionId) -> String {
    format!("skills/{}.json", id.as_str())
}

pub fn workflows(id: &SessionId) -> String {
    format!("workflows/{}.json", id.as_str())
}
