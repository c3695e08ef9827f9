#[cfg(feature = "mock")]
mod common;

#[cfg(feature = "mock")]
mod mock_tests {
    use super::common::{track, FakeSpotify};
    use liked_sorter::{
        find_playlist, ArtistTrackRemover, Blocklist, CancellationState, LibraryClient,
        MockCoverImageGenerator, MockLibraryClient, MockPlaylistClient, Page, Playlist,
        PlaylistSorter, Result, SorterError,
    };
    use mockall::predicate::*;
    use mockall::Sequence;

    #[tokio::test]
    async fn test_mock_library_paging_and_removal() -> Result<()> {
        let mut mock_client = MockLibraryClient::new();
        let mut seq = Sequence::new();

        mock_client
            .expect_list_liked_tracks()
            .with(eq(0), eq(50))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(Page::new(
                    vec![
                        track("feat", &["Good", "BadArtist"], "2023-01-01T00:00:00Z"),
                        track("clean", &["Good"], "2023-01-01T00:00:00Z"),
                    ],
                    2,
                ))
            });

        mock_client
            .expect_remove_from_library()
            .withf(|ids| ids.len() == 1 && ids[0] == "feat")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        // One removed from the front, so the next read starts at 1.
        mock_client
            .expect_list_liked_tracks()
            .with(eq(1), eq(50))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(Page::new(Vec::new(), 1)));

        let cancel = CancellationState::new();
        let report = ArtistTrackRemover::new(&mock_client, Blocklist::new(["BadArtist"]))
            .run(&cancel)
            .await?;

        assert_eq!(report.removed, 1);
        assert_eq!(report.scanned, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_mock_as_trait_object() -> Result<()> {
        let mut mock_client = MockLibraryClient::new();
        mock_client
            .expect_list_liked_tracks()
            .returning(|_, _| Ok(Page::empty()));

        let client: &dyn LibraryClient = &mock_client;
        let page = client.list_liked_tracks(0, 50).await?;

        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_mock_locator_error_propagates() {
        let mut mock_client = MockPlaylistClient::new();
        mock_client
            .expect_list_user_playlists()
            .with(eq("me"), eq(0), eq(50))
            .times(1)
            .returning(|_, _, _| Err(SorterError::RateLimit { retry_after: 5 }));

        let cancel = CancellationState::new();
        let result = find_playlist(&mock_client, &cancel, "me", "Liked Songs (2020)", 50).await;

        assert!(matches!(
            result,
            Err(SorterError::RateLimit { retry_after: 5 })
        ));
    }

    #[tokio::test]
    async fn test_mock_locator_finds_owned_playlist() -> Result<()> {
        let mut mock_client = MockPlaylistClient::new();
        mock_client.expect_list_user_playlists().returning(|_, _, _| {
            Ok(Page::new(
                vec![Playlist {
                    id: "p1".to_string(),
                    name: "Liked Songs (2020)".to_string(),
                    owner_id: "me".to_string(),
                }],
                1,
            ))
        });

        let cancel = CancellationState::new();
        let found = find_playlist(&mock_client, &cancel, "me", "Liked Songs (2020)", 50).await?;

        assert_eq!(found.map(|p| p.id), Some("p1".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_mock_cover_generator_called_once_per_year() -> Result<()> {
        let fake = FakeSpotify::new(vec![
            track("a", &["Artist"], "2023-01-01T00:00:00Z"),
            track("b", &["Artist"], "2024-06-01T00:00:00Z"),
        ]);

        let mut covers = MockCoverImageGenerator::new();
        covers
            .expect_generate()
            .with(eq("Liked Songs (2023)"))
            .times(1)
            .returning(|_| Ok(vec![0xFF, 0xD8]));
        covers
            .expect_generate()
            .with(eq("Liked Songs (2024)"))
            .times(1)
            .returning(|_| Ok(vec![0xFF, 0xD8]));

        let cancel = CancellationState::new();
        let report = PlaylistSorter::new(&fake, covers).run(&cancel).await?;

        assert!(report.years.iter().all(|y| y.cover_applied));
        Ok(())
    }
}
