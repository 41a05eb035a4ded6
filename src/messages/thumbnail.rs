use crate::gateway::ThumbnailRequest;

pub enum ThumbnailCommand {
    Submit(ThumbnailRequest)
}

pub enum ThumbnailStatus {
    Finished(Result<String, String>)
}
