//! Atom feed bodies shaped like a real channel feed

/// One `<entry>` of a channel feed
#[derive(Debug, Clone)]
pub struct FeedEntry {
    /// `None` omits `<yt:videoId>`; the entry keeps a `yt:video:` Atom id
    pub video_id: Option<String>,
    pub title: String,
    pub published: String,
    pub description: String,
}

impl FeedEntry {
    pub fn new(video_id: &str, title: &str) -> Self {
        Self {
            video_id: Some(video_id.to_string()),
            title: title.to_string(),
            published: "2024-03-01T10:00:00+00:00".to_string(),
            description: format!("Feed description for {}", title),
        }
    }

    /// Entry without a `<yt:videoId>` element
    pub fn without_id(title: &str) -> Self {
        Self {
            video_id: None,
            ..Self::new("", title)
        }
    }

    fn to_xml(&self) -> String {
        let (id, video_id, link, thumbnail) = match &self.video_id {
            Some(v) => (
                format!("yt:video:{}", v),
                format!("<yt:videoId>{}</yt:videoId>", v),
                format!(
                    r#"<link rel="alternate" href="https://www.youtube.com/watch?v={}"/>"#,
                    v
                ),
                format!(
                    r#"<media:thumbnail url="https://i1.ytimg.com/vi/{}/hqdefault.jpg" width="480" height="360"/>"#,
                    v
                ),
            ),
            None => (
                "yt:video:no_video_element".to_string(),
                String::new(),
                String::new(),
                String::new(),
            ),
        };
        format!(
            r#"
  <entry>
    <id>{id}</id>
    {video_id}
    <yt:channelId>UC_mock_channel</yt:channelId>
    <title>{title}</title>
    {link}
    <author><name>Mock Channel</name></author>
    <published>{published}</published>
    <updated>{published}</updated>
    <media:group>
      <media:title>{title}</media:title>
      <media:content url="https://www.youtube.com/v/x" type="application/x-shockwave-flash" width="640" height="390"/>
      {thumbnail}
      <media:description>{description}</media:description>
    </media:group>
  </entry>"#,
            id = id,
            video_id = video_id,
            title = self.title,
            link = link,
            published = self.published,
            thumbnail = thumbnail,
            description = self.description,
        )
    }
}

/// Full feed document around `entries`
pub fn channel_feed(entries: &[FeedEntry]) -> String {
    let body: String = entries.iter().map(FeedEntry::to_xml).collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns:media="http://search.yahoo.com/mrss/" xmlns="http://www.w3.org/2005/Atom">
  <link rel="self" href="http://www.youtube.com/feeds/videos.xml?channel_id=UC_mock_channel"/>
  <id>yt:channel:UC_mock_channel</id>
  <yt:channelId>UC_mock_channel</yt:channelId>
  <title>Mock Channel</title>
  <author><name>Mock Channel</name></author>
  <published>2015-01-01T00:00:00+00:00</published>{}
</feed>
"#,
        body
    )
}

/// Feed with no entries
pub fn empty_feed() -> String {
    channel_feed(&[])
}

/// Three entries, the second without a video id
pub fn three_entry_feed() -> String {
    channel_feed(&[
        FeedEntry::new("vid_alpha", "Alpha"),
        FeedEntry::without_id("Community post"),
        FeedEntry::new("vid_gamma", "Gamma"),
    ])
}
